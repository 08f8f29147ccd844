use std::path::PathBuf;

pub fn default_version() -> u32 {
    1
}

pub fn default_projects_root() -> PathBuf {
    PathBuf::from("projects")
}

pub fn default_model_id() -> String {
    "claude-sonnet-4-20250514".to_string()
}

pub fn default_max_tokens() -> u32 {
    16000
}

pub fn default_temperature() -> f32 {
    0.2
}

pub fn default_claude_binary() -> PathBuf {
    // Check common install location first
    if let Some(home) = std::env::var_os("HOME") {
        let local_path = PathBuf::from(home).join(".claude/local/claude");
        if local_path.exists() {
            return local_path;
        }
    }
    PathBuf::from("claude")
}

pub fn default_codex_binary() -> PathBuf {
    PathBuf::from("codex")
}

pub fn default_quality_threshold() -> f64 {
    7.0
}

pub fn default_max_pages() -> usize {
    crate::workflow::MAX_DESIGN_PAGES
}

pub fn default_commit_message() -> String {
    "Canvas workflow: generate multi-page prototype".to_string()
}

pub fn default_canvas_name() -> String {
    "Canvas".to_string()
}

pub fn default_git_user_name() -> String {
    "Canvas".to_string()
}

pub fn default_git_user_email() -> String {
    "canvas@canvasgen.local".to_string()
}
