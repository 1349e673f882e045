pub mod product_lines;

pub use product_lines::ProductLineRepository;
