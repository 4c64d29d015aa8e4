// Pipeline orchestration - the full extraction-and-classification pass.

pub mod scan;
