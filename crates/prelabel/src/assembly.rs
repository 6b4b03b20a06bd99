use tracing::debug;
use uuid::Uuid;

use crate::{
    algorithms::project,
    label_config::LabelSchema,
    prediction::{
        AnnotationRecord, AttributeKind, AttributeRecord, ChoicesValue, RectangleValue, RegionRecord,
    },
    types::{Defaults, ImageDimensions, MaskCandidate},
};

const ATTRIBUTE_ORIGIN: &str = "manual";

/// Region ids for one prediction call: `region_<call>_<n>`.
///
/// The call part is random per generator and the counter is monotonic, so ids
/// never repeat within a call and do not collide across concurrent calls.
#[derive(Debug, Clone)]
pub struct RegionIdGenerator {
    call_id: String,
    next: u32,
}

impl RegionIdGenerator {
    pub fn new() -> Self {
        Self::with_call_id(Uuid::new_v4().simple().to_string())
    }

    pub fn with_call_id(call_id: impl Into<String>) -> Self {
        Self {
            call_id: call_id.into(),
            next: 0,
        }
    }

    pub fn call_id(&self) -> &str {
        &self.call_id
    }

    pub fn next_id(&mut self) -> String {
        let id = format!("region_{}_{}", self.call_id, self.next);
        self.next += 1;
        id
    }
}

impl Default for RegionIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Turns accepted candidates into region records with their attributes.
pub struct RegionAssembler<'a> {
    schema: &'a LabelSchema,
}

impl<'a> RegionAssembler<'a> {
    pub fn new(schema: &'a LabelSchema) -> Self {
        Self { schema }
    }

    /// One region per candidate, in order, each directly followed by its
    /// `colors`, `size` and `pattern` attributes when the defaults carry them.
    pub fn assemble(
        &self,
        accepted: &[MaskCandidate],
        defaults: &Defaults,
        image: ImageDimensions,
        ids: &mut RegionIdGenerator,
    ) -> Vec<AnnotationRecord> {
        let mut records = Vec::new();

        for (index, candidate) in accepted.iter().enumerate() {
            let Some(bbox) = candidate.pixel_bbox() else {
                debug!(index, "Skipping candidate with an empty mask");
                continue;
            };

            let region_id = ids.next_id();
            records.push(AnnotationRecord::Region(RegionRecord {
                id: region_id.clone(),
                from_name: self.schema.from_name.clone(),
                to_name: self.schema.to_name.clone(),
                value: RectangleValue {
                    rectanglelabels: vec![self.schema.region_label.clone()],
                    bbox: project(&bbox, image),
                },
                score: candidate.predicted_iou,
                readonly: false,
            }));

            if !defaults.colors.is_empty() {
                records.push(self.attribute(&region_id, AttributeKind::Colors, defaults.colors.clone()));
            }
            if let Some(size) = &defaults.size {
                records.push(self.attribute(&region_id, AttributeKind::Size, vec![size.clone()]));
            }
            if let Some(pattern) = &defaults.pattern {
                records.push(self.attribute(&region_id, AttributeKind::Pattern, vec![pattern.clone()]));
            }
        }

        records
    }

    fn attribute(&self, region_id: &str, kind: AttributeKind, choices: Vec<String>) -> AnnotationRecord {
        AnnotationRecord::Attribute(AttributeRecord {
            id: format!("{region_id}_{}", kind.id_suffix()),
            kind,
            from_name: self.schema.attribute_from_name(kind).to_string(),
            to_name: self.schema.to_name.clone(),
            value: ChoicesValue { choices },
            readonly: false,
            origin: ATTRIBUTE_ORIGIN.to_string(),
            parent_id: region_id.to_string(),
        })
    }
}
