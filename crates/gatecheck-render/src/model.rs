#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderableStatus {
    Pass,
    Fail,
    Skip,
}

impl RenderableStatus {
    pub(crate) fn label(self) -> &'static str {
        match self {
            RenderableStatus::Pass => "PASS",
            RenderableStatus::Fail => "FAIL",
            RenderableStatus::Skip => "SKIP",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderableViolation {
    pub message: String,
    pub path: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderableFailure {
    pub assertion: usize,
    pub expected: String,
    pub actual: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderableCase {
    pub name: String,
    pub status: RenderableStatus,
    pub matched: bool,
    pub violations: Vec<RenderableViolation>,
    pub failures: Vec<RenderableFailure>,
    pub error: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderableTest {
    pub name: String,
    pub template: String,
    pub constraint: String,
    pub cases: Vec<RenderableCase>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderableSuite {
    pub name: String,
    pub path: Option<String>,
    pub tests: Vec<RenderableTest>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RenderableSummary {
    pub suites: u32,
    pub tests: u32,
    pub cases: u32,
    pub passed: u32,
    pub failed: u32,
    pub skipped: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderableReport {
    /// `Pass` or `Fail`; never `Skip`.
    pub verdict: RenderableStatus,
    pub summary: RenderableSummary,
    pub suites: Vec<RenderableSuite>,
}

impl RenderableReport {
    /// Failing cases with their suite and test, in report order.
    pub fn failing_cases(
        &self,
    ) -> impl Iterator<Item = (&RenderableSuite, &RenderableTest, &RenderableCase)> {
        self.suites.iter().flat_map(|s| {
            s.tests.iter().flat_map(move |t| {
                t.cases
                    .iter()
                    .filter(|c| c.status == RenderableStatus::Fail)
                    .map(move |c| (s, t, c))
            })
        })
    }
}
