//! Data-parallel helpers.
//!
//! The forward model evaluates many independent time points, the Jacobian
//! many independent columns and a sensitivity study many independent curves.
//! These helpers run such maps on the rayon pool when the `parallel` feature
//! is enabled and sequentially otherwise. Results are always returned in
//! input order, so both builds produce identical numbers.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::error::Result;

/// Map `f` over `items`, preserving order.
pub fn map_ordered<T, R, F>(items: &[T], f: F) -> Vec<R>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> R + Sync + Send,
{
    #[cfg(feature = "parallel")]
    {
        items.par_iter().map(f).collect()
    }
    #[cfg(not(feature = "parallel"))]
    {
        items.iter().map(f).collect()
    }
}

/// Fallible form of [`map_ordered`]. Returns one of the errors if any item
/// fails.
pub fn try_map_ordered<T, R, F>(items: &[T], f: F) -> Result<Vec<R>>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> Result<R> + Sync + Send,
{
    #[cfg(feature = "parallel")]
    {
        items.par_iter().map(f).collect()
    }
    #[cfg(not(feature = "parallel"))]
    {
        items.iter().map(f).collect()
    }
}
