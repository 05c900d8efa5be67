/*!
 * Structure-preserving translation pipeline.
 *
 * - `params`: formality, glossary and language pair for one document
 * - `units`: flattening of pages into translation units and back
 * - `congruence`: shape comparison between source and translated pages
 * - `merge`: copying source metadata onto translated pages
 * - `orchestrator`: page-by-page driver with progress, cancellation and retry
 */

pub use self::congruence::check_congruence;
pub use self::merge::merge_metadata;
pub use self::orchestrator::{CancellationFlag, DocumentTranslation, DocumentTranslator};
pub use self::params::{Formality, Glossary, GlossaryTerm, TranslationParams};
pub use self::units::{all_blank, TranslationUnits};

pub mod congruence;
pub mod merge;
pub mod orchestrator;
pub mod params;
pub mod units;
