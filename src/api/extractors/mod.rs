/*!
 * Authorization extractors
 *
 * Public API:
 * - Authorized
 */

mod authorized;

pub use authorized::Authorized;
