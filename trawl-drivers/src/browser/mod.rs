pub mod behavioral;
pub mod driver;
pub mod session;
