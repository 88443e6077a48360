/*!
 * Claims extractor
 *
 * Responsibility:
 * - token refresh middleware が request extensions に入れた ClaimStore を handler に渡す
 *
 * Public API:
 * - ClaimsExtractor
 */

mod core;

pub use core::ClaimsExtractor;
