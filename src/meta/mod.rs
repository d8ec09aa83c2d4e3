//! The two meta-solvers (spec §4.G): [`governor`] classifies a position and
//! dispatches to one engine with a fallback ladder, [`sequential`] just
//! runs the whole family in a fixed order and takes the first verified hit.
//! Both consult the solution store first and emit [`crate::progress`]
//! events at every engine transition.

pub mod governor;
pub mod sequential;
