pub mod bash;
pub mod capture;
