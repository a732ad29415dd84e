pub mod duplicates;
pub mod imports;
