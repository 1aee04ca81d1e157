//! Edge cost model.

use serde::{Deserialize, Serialize};

use crate::format::FileFormat;

/// Extra cost of converting between two semantic categories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryChangeCost {
    pub from: String,
    pub to: String,
    pub cost: f64,
}

impl CategoryChangeCost {
    pub fn new(from: impl Into<String>, to: impl Into<String>, cost: f64) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            cost,
        }
    }

    fn matches(&self, from: &[&str], to: &[&str]) -> bool {
        from.contains(&self.from.as_str()) && to.contains(&self.to.as_str())
    }
}

/// Constants used to weight route graph edges.
///
/// ```text
/// cost = depth_cost + category_change_cost(from, to) + priority_cost * rank
/// if !to.lossless { cost *= lossy_cost_multiplier }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostModel {
    /// Base cost of every hop.
    #[serde(default = "default_depth_cost")]
    pub depth_cost: f64,

    /// Known category transitions and their costs.
    #[serde(default = "default_category_change_costs")]
    pub category_change_costs: Vec<CategoryChangeCost>,

    /// Cost of a category transition missing from the table.
    #[serde(default = "default_category_change_cost")]
    pub default_category_change_cost: f64,

    /// Multiplier applied when the destination format is lossy.
    #[serde(default = "default_lossy_cost_multiplier")]
    pub lossy_cost_multiplier: f64,

    /// Cost added per position of the handler in priority order.
    #[serde(default = "default_priority_cost")]
    pub priority_cost: f64,

    /// Charge every table entry instead of the cheapest matching one.
    #[serde(default)]
    pub category_hard_search: bool,
}

fn default_depth_cost() -> f64 {
    1.0
}

fn default_category_change_costs() -> Vec<CategoryChangeCost> {
    vec![
        CategoryChangeCost::new("image", "video", 0.2),
        CategoryChangeCost::new("video", "image", 0.4),
        CategoryChangeCost::new("image", "audio", 2.0),
        CategoryChangeCost::new("audio", "image", 1.4),
        CategoryChangeCost::new("video", "audio", 1.0),
        CategoryChangeCost::new("audio", "video", 1.0),
        CategoryChangeCost::new("text", "image", 0.5),
        CategoryChangeCost::new("image", "text", 0.5),
    ]
}

fn default_category_change_cost() -> f64 {
    0.6
}

fn default_lossy_cost_multiplier() -> f64 {
    1.4
}

fn default_priority_cost() -> f64 {
    0.05
}

impl Default for CostModel {
    fn default() -> Self {
        Self {
            depth_cost: default_depth_cost(),
            category_change_costs: default_category_change_costs(),
            default_category_change_cost: default_category_change_cost(),
            lossy_cost_multiplier: default_lossy_cost_multiplier(),
            priority_cost: default_priority_cost(),
            category_hard_search: false,
        }
    }
}

impl CostModel {
    /// Cost of moving from the categories of `from` to those of `to`.
    pub fn category_change_cost(&self, from: &FileFormat, to: &FileFormat) -> f64 {
        let from_categories = from.categories();
        let to_categories = to.categories();

        match (from_categories.is_empty(), to_categories.is_empty()) {
            (true, true) => 0.0,
            (true, false) | (false, true) => self.default_category_change_cost,
            (false, false) if self.category_hard_search => self
                .category_change_costs
                .iter()
                .map(|c| {
                    if c.matches(&from_categories, &to_categories) {
                        c.cost
                    } else {
                        self.default_category_change_cost
                    }
                })
                .sum(),
            (false, false) => {
                if from_categories.iter().any(|c| to_categories.contains(c)) {
                    return 0.0;
                }
                self.category_change_costs
                    .iter()
                    .filter(|c| c.matches(&from_categories, &to_categories))
                    .map(|c| c.cost)
                    .reduce(f64::min)
                    .unwrap_or(self.default_category_change_cost)
            }
        }
    }

    /// Cost of an edge from `from` to `to` offered by the handler at `rank`.
    pub fn edge_cost(&self, from: &FileFormat, to: &FileFormat, rank: usize) -> f64 {
        let mut cost = self.depth_cost
            + self.category_change_cost(from, to)
            + self.priority_cost * rank as f64;
        if !to.lossless {
            cost *= self.lossy_cost_multiplier;
        }
        cost
    }
}
