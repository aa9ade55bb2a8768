pub mod kernel;
pub mod solver;
pub mod svm;
