pub mod classifications;

pub use classifications::ClassificationRepository;
