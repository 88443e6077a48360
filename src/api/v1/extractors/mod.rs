mod claims;

pub use claims::ClaimsExtractor;
