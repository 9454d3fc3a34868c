pub mod send_sol;
pub mod spl_token;
pub mod wallet;
