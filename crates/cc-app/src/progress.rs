#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStage {
    CheckingPrevious,
    Reused,
    Solving,
    Failed,
    SavingResults,
    Completed,
}

impl BatchStage {
    pub fn label(self) -> &'static str {
        match self {
            BatchStage::CheckingPrevious => "checking previous runs",
            BatchStage::Reused => "reused",
            BatchStage::Solving => "solving",
            BatchStage::Failed => "failed",
            BatchStage::SavingResults => "saving results",
            BatchStage::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone)]
pub struct BatchProgressEvent {
    pub stage: BatchStage,
    pub model_id: Option<u32>,
    pub completed: usize,
    pub total: usize,
    pub elapsed_wall_s: f64,
    pub message: Option<String>,
}

impl BatchProgressEvent {
    pub fn fraction_complete(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }
}
