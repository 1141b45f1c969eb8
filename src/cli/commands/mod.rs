pub mod lookup;
pub mod session;
