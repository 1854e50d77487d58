pub mod corpus;
pub mod dataset;
