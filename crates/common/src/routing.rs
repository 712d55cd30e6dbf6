//! Routing header declarations and their combinations

use crate::model::Method;

/// One routing key of a method and the request fields that can supply it.
///
/// The variants are alternatives: the client uses the last variant whose
/// field matches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoutingInfo {
    pub name: String,
    pub variants: Vec<RoutingInfoVariant>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoutingInfoVariant {
    pub field_path: Vec<String>,
    pub prefix: RoutingPathSpec,
    pub matching: RoutingPathSpec,
    pub suffix: RoutingPathSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoutingPathSpec {
    pub segments: Vec<String>,
}

/// One variant chosen for every routing key of a method.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoutingInfoCombo {
    pub items: Vec<RoutingInfoComboItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoutingInfoComboItem {
    pub name: String,
    pub variant: RoutingInfoVariant,
}

impl RoutingInfoVariant {
    pub fn field_name(&self) -> String {
        self.field_path.join(".")
    }

    /// Renders prefix, matching and suffix as one `/`-separated template.
    pub fn template_as_string(&self) -> String {
        [&self.prefix, &self.matching, &self.suffix]
            .into_iter()
            .map(|spec| spec.segments.join("/"))
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("/")
    }
}

impl Method {
    /// Expands the routing keys into every combination of their variants.
    ///
    /// Combinations come out in odometer order: the first key changes
    /// slowest and the last key fastest.
    pub fn routing_combos(&self) -> Vec<RoutingInfoCombo> {
        if self.routing.is_empty() {
            return Vec::new();
        }
        let mut combos = vec![RoutingInfoCombo::default()];
        for info in &self.routing {
            combos = combos
                .iter()
                .flat_map(|combo| {
                    info.variants.iter().map(move |variant| {
                        let mut items = combo.items.clone();
                        items.push(RoutingInfoComboItem {
                            name: info.name.clone(),
                            variant: variant.clone(),
                        });
                        RoutingInfoCombo { items }
                    })
                })
                .collect();
        }
        combos
    }
}
