use crate::dataset::Dataset;
use crate::options::Options;

/// Returns a copy of `dataset` narrowed to the selection in `options`.
///
/// Pruning runs property, structure, element, then model. Emptied
/// containers are kept; requested keys missing from the dataset simply
/// produce nothing.
pub fn filter(dataset: &Dataset, options: &Options) -> Dataset {
    let mut pruned = dataset.clone();
    pruned.retain_properties(|property| options.wants_property(property));
    for structures in pruned.structures_mut() {
        structures.retain(|structure, _| options.wants_structure(structure));
        for chunk in structures.values_mut() {
            if !options.elements.is_all() {
                chunk.retain(|element, _| options.wants_element(element));
            }
            if options.models.is_all() {
                continue;
            }
            for models in chunk.values_mut() {
                models.retain(|model, _| options.wants_model(model));
            }
        }
    }
    pruned
}
