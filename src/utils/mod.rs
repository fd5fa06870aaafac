pub mod crypto;
pub mod redirect;
pub mod responses;
