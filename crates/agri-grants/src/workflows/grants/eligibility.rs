use super::domain::TargetArea;

/// True iff some target area matches both the ward and the municipality.
pub fn is_eligible(ward_number: u32, municipality: &str, target_areas: &[TargetArea]) -> bool {
    target_areas
        .iter()
        .any(|area| area.ward_number == ward_number && area.municipality == municipality)
}
