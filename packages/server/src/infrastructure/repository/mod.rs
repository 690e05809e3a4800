//! Repository implementations

pub mod inmemory;

pub use inmemory::InMemoryChatRepository;
