//! Orchestration services: the upload session manager and the result
//! reconciler.

pub mod reconciler;
pub mod upload;

#[cfg(test)]
pub(crate) mod test_support;
