//! Hyperparameter search: grids, cross-validation, grid search

pub mod cross_validation;
pub mod grid;
pub mod grid_search;

pub use cross_validation::{CvResults, CvSplit, StratifiedKFold};
pub use grid::{format_params, ParamGrid, ParamSet, ParamSetExt, ParamValue};
pub use grid_search::{GridSearch, GridSearchResult};
