mod blocking;
mod builder;
pub(crate) mod ring;

pub use blocking::BlockingQueue;
pub use builder::QueueBuilder;

