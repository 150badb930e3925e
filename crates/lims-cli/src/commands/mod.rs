pub mod attachment;
pub mod create;
pub mod dispatch;
pub mod doc;
pub mod form;
pub mod get;
pub mod init;
pub mod list;
pub mod locate;
pub mod log;
pub mod sample;
pub mod schema;
pub mod search;
pub mod update;

mod shared;
