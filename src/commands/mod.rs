//! One module per subcommand, each a thin struct wrapping the library
//! components wired together for that tool's dataflow.

pub mod break_blocks;
pub mod check_reference;
pub mod extract_variants;
pub mod gatk_to_gvcf;
pub mod merge_gvcf;
pub mod set_haploid;

pub use break_blocks::BreakBlocksCommand;
pub use check_reference::CheckReferenceCommand;
pub use extract_variants::ExtractVariantsCommand;
pub use gatk_to_gvcf::GatkToGvcfCommand;
pub use merge_gvcf::MergeGvcfCommand;
pub use set_haploid::SetHaploidCommand;
