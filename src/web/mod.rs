pub mod csrf;
pub mod page;
pub mod validator;
pub mod views;
