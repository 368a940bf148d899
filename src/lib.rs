// colsim: cross-language column header similarity for scraped Wikipedia tables
//
// This is the library root. Each module corresponds to one stage of the
// analysis pipeline: corpus loading, embedding, similarity, and reporting.

pub mod config;
pub mod corpus;
pub mod embedding;
pub mod output;
pub mod pipeline;
pub mod similarity;
