// Services module - Business logic

pub mod codec;
pub mod qr_generator;
pub mod registry;
pub mod validator;
