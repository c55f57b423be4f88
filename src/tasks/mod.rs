pub mod train;

pub use train::{ReportFormat, TrainReport, TrainTask};
