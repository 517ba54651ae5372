// provenance_app/src/collaborators/mod.rs

//! Local stand-ins for the provenance SDK and stream transport, implementing the
//! sluice collaborator traits.

pub mod annotator;
pub mod mutator;
pub mod publisher;
pub mod source;

pub use annotator::DigestAnnotator;
pub use mutator::ReseedMutator;
pub use publisher::LinePublisher;
pub use source::SampleSource;
