pub mod check;
pub mod component;
pub mod item;
pub mod localized;
pub mod survey;

pub use check::{DefinitionError, check_survey};
pub use component::{ComponentProperties, ComponentRole, ResponseComponent};
pub use item::{GroupItem, SelectionMethod, SingleItem, SurveyItem, Validation, ValidationKind};
pub use localized::LocalizedText;
pub use survey::Survey;
