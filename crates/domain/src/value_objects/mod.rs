//! Value objects - Immutable objects defined by their attributes

mod attributes;
mod calendar;
mod check;
mod vitals;

pub use attributes::{
    Attribute, AttributeModifiers, AttributeSet, ATTRIBUTE_MAX, ATTRIBUTE_MIN,
    BALANCED_ATTRIBUTE_VALUE,
};
pub use calendar::GameDate;
pub use check::{
    CheckOutcome, CheckThresholds, CRITICAL_FAILURE_MAX, CRITICAL_FLOOR_DEFAULT,
    CRITICAL_FLOOR_MIN, DRAW_MAX, DRAW_MIN, THRESHOLD_MAX, THRESHOLD_MIN,
};
pub use vitals::{StatDeltas, Vitals, VITAL_MAX, VITAL_MIN};
