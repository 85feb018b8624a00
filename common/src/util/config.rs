use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub router: RouterConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            router: RouterConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CostModel {
    Standard,
    Bounded,
    Nc,
}

impl CostModel {
    pub fn parse(s: &str) -> Result<Self, String> {
        match s {
            "" | "standard" => Ok(CostModel::Standard),
            "bounded" => Ok(CostModel::Bounded),
            "nc" => Ok(CostModel::Nc),
            other => Err(format!(
                "unknown cost model '{}'. Options are 'standard', 'bounded', 'nc'.",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RouterConfig {
    #[serde(default = "default_cost_model")]
    pub cost_model: CostModel,
    #[serde(default = "default_true")]
    pub use_net_decomposition: bool,
    #[serde(default = "default_true")]
    pub use_net_ordering: bool,
    #[serde(default)]
    pub use_chain_ordering: bool,
    #[serde(default = "default_time_limit_secs")]
    pub time_limit_secs: u64,
    // 0 means no iteration cap; the time limit bounds the loop.
    #[serde(default)]
    pub max_iterations: usize,
    #[serde(default = "default_initial_penalty")]
    pub initial_penalty: i32,
    #[serde(default = "default_penalty_step")]
    pub penalty_step: i32,
    #[serde(default = "default_bisect_start_hi")]
    pub bisect_start_hi: i32,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            cost_model: default_cost_model(),
            use_net_decomposition: true,
            use_net_ordering: true,
            use_chain_ordering: false,
            time_limit_secs: default_time_limit_secs(),
            max_iterations: 0,
            initial_penalty: default_initial_penalty(),
            penalty_step: default_penalty_step(),
            bisect_start_hi: default_bisect_start_hi(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub emit_heatmaps: bool,
    #[serde(default = "default_heatmap_dir")]
    pub heatmap_dir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            emit_heatmaps: false,
            heatmap_dir: default_heatmap_dir(),
        }
    }
}

fn default_cost_model() -> CostModel {
    CostModel::Standard
}

fn default_true() -> bool {
    true
}

fn default_time_limit_secs() -> u64 {
    600
}

fn default_initial_penalty() -> i32 {
    20
}

fn default_penalty_step() -> i32 {
    1
}

fn default_bisect_start_hi() -> i32 {
    10
}

fn default_heatmap_dir() -> String {
    "output".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let cfg: Config = toml::from_str(
            "[router]\ncost_model = \"nc\"\ntime_limit_secs = 30\n",
        )
        .unwrap();
        assert_eq!(cfg.router.cost_model, CostModel::Nc);
        assert_eq!(cfg.router.time_limit_secs, 30);
        assert!(cfg.router.use_net_decomposition);
        assert_eq!(cfg.router.initial_penalty, 20);
        assert!(!cfg.output.emit_heatmaps);
    }

    #[test]
    fn cost_model_names() {
        assert_eq!(CostModel::parse("").unwrap(), CostModel::Standard);
        assert_eq!(CostModel::parse("bounded").unwrap(), CostModel::Bounded);
        assert!(CostModel::parse("fancy").is_err());
    }
}
