use crate::models::{Assignment, GodparentRelation, RelationMap};

/// Convert an assignment into the mentee -> {mentor} relation map
///
/// Only matched mentees appear as keys.
pub fn to_relation_map(assignment: &Assignment) -> RelationMap {
    let mut relations = RelationMap::new();
    for (mentee, mentor) in assignment.iter() {
        relations
            .entry(mentee.to_string())
            .or_default()
            .insert(mentor.to_string());
    }
    relations
}

/// Flatten a relation map into godchild -> godparent rows, sorted
pub fn relation_rows(relations: &RelationMap) -> Vec<GodparentRelation> {
    relations
        .iter()
        .flat_map(|(godchild, godparents)| {
            godparents.iter().map(move |godparent| GodparentRelation {
                godchild_id: godchild.clone(),
                godparent_id: godparent.clone(),
            })
        })
        .collect()
}
