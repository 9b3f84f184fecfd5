mod atomic;
mod counter_store;
mod output_store;
mod recipient_store;

pub use atomic::atomic_write;
pub use counter_store::FileCounterStore;
pub use output_store::FsOutputStore;
pub use recipient_store::FileRecipientStore;
