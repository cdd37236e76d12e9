pub mod cleaner;
pub mod stats;
pub mod validator;
