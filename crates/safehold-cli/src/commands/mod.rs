pub mod init;
pub mod item;
pub mod site;
pub mod sync;
