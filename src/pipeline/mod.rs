//! Named stages with dependencies, run in order.

pub mod command;
pub mod source;
pub mod watch;

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::time::Instant;

use console::style;

use crate::compile::TemplateCompiler;
use crate::config::schema::CommandConfig;
use crate::config::{TasksConfig, UserConfig};
use crate::error::{Result, TasksError};
use crate::karma::{TestPreset, TestRunner};
use crate::soy::{run_soy, ParameterRegistry};

use self::watch::{watch_sources, SourceFilter};

/// Stages every project has, whether or not they are configured.
pub const BUILTIN_STAGES: &[&str] = &[
    "build",
    "clean",
    "soy",
    "test",
    "test:unit",
    "test:coverage",
    "test:browsers",
    "test:saucelabs",
    "test:watch",
    "watch",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageAction {
    /// Remove the build directory.
    Clean,
    /// Generate, compile and wrap the soy templates.
    Soy,
    /// Run the test runner with a preset.
    Test(TestPreset),
    /// Run an external program.
    Command(CommandConfig),
    /// Run groups of stages one group after another.
    Sequence(Vec<Vec<String>>),
    /// Nothing beyond the stage's dependencies.
    Group,
    /// Re-run the build whenever a template source changes.
    Watch,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage {
    pub name: String,
    pub deps: Vec<String>,
    pub action: StageAction,
}

/// The stage graph of a project.
#[derive(Debug, Clone)]
pub struct Pipeline {
    stages: BTreeMap<String, Stage>,
}

impl Pipeline {
    /// Built-in stages plus the ones declared in the config.
    pub fn from_config(config: &TasksConfig) -> Self {
        let mut stages = BTreeMap::new();
        let mut add = |name: &str, deps: Vec<String>, action: StageAction| {
            stages.insert(
                name.to_string(),
                Stage {
                    name: name.to_string(),
                    deps,
                    action,
                },
            );
        };

        add("clean", Vec::new(), StageAction::Clean);
        add("soy", Vec::new(), StageAction::Soy);
        add(
            "build",
            Vec::new(),
            StageAction::Sequence(config.build.sequence.clone()),
        );
        add("test", vec!["test:unit".to_string()], StageAction::Group);
        add("watch", vec!["build".to_string()], StageAction::Watch);
        for preset in TestPreset::ALL {
            add(preset.stage_name(), Vec::new(), StageAction::Test(preset));
        }

        for stage in &config.stages {
            let action = match &stage.command {
                Some(command) => StageAction::Command(command.clone()),
                None => StageAction::Group,
            };
            add(&stage.name, stage.deps.clone(), action);
        }

        Self { stages }
    }

    pub fn stage(&self, name: &str) -> Option<&Stage> {
        self.stages.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.stages.keys().map(String::as_str)
    }

    /// Stages to run for `target`, dependencies first, each stage once.
    pub fn plan(&self, target: &str) -> Result<Vec<&Stage>> {
        let mut order = Vec::new();
        let mut done = BTreeSet::new();
        let mut chain = Vec::new();
        self.visit(target, &mut done, &mut chain, &mut order)?;
        Ok(order)
    }

    fn visit<'a>(
        &'a self,
        name: &str,
        done: &mut BTreeSet<String>,
        chain: &mut Vec<String>,
        order: &mut Vec<&'a Stage>,
    ) -> Result<()> {
        if done.contains(name) {
            return Ok(());
        }
        if let Some(start) = chain.iter().position(|n| n == name) {
            let mut cycle = chain[start..].to_vec();
            cycle.push(name.to_string());
            return Err(TasksError::CircularStages { chain: cycle });
        }

        let stage = self.stage(name).ok_or_else(|| TasksError::UnknownStage {
            name: name.to_string(),
        })?;

        chain.push(name.to_string());
        for dep in &stage.deps {
            self.visit(dep, done, chain, order)?;
        }
        chain.pop();

        done.insert(name.to_string());
        order.push(stage);
        Ok(())
    }
}

/// A project directory with its configuration.
#[derive(Debug, Clone)]
pub struct Project {
    pub root: PathBuf,
    pub config: TasksConfig,
    pub user: Option<UserConfig>,
}

/// Runs stages of one project. Holds the state shared by the stages of one invocation.
pub struct Runner<'a> {
    project: &'a Project,
    pipeline: Pipeline,
    compiler: &'a dyn TemplateCompiler,
    tests: &'a dyn TestRunner,
    registry: ParameterRegistry,
    completed: BTreeSet<String>,
}

impl<'a> Runner<'a> {
    pub fn new(
        project: &'a Project,
        compiler: &'a dyn TemplateCompiler,
        tests: &'a dyn TestRunner,
    ) -> Self {
        Self {
            pipeline: Pipeline::from_config(&project.config),
            project,
            compiler,
            tests,
            registry: ParameterRegistry::new(),
            completed: BTreeSet::new(),
        }
    }

    /// Params collected by the soy stage during this invocation.
    pub fn registry(&self) -> &ParameterRegistry {
        &self.registry
    }

    /// Names of the stages that have run, in name order.
    pub fn completed(&self) -> impl Iterator<Item = &str> {
        self.completed.iter().map(String::as_str)
    }

    /// Run `target` and its dependencies. Stages that already ran are skipped.
    pub fn run(&mut self, target: &str) -> Result<()> {
        let plan: Vec<Stage> = self
            .pipeline
            .plan(target)?
            .into_iter()
            .filter(|s| !self.completed.contains(&s.name))
            .cloned()
            .collect();

        for stage in plan {
            self.run_stage(&stage)?;
        }
        Ok(())
    }

    fn run_stage(&mut self, stage: &Stage) -> Result<()> {
        if self.completed.contains(&stage.name) {
            return Ok(());
        }

        let started = Instant::now();
        println!("Starting '{}'...", style(&stage.name).cyan());

        match &stage.action {
            StageAction::Clean => self.clean()?,
            StageAction::Soy => self.soy()?,
            StageAction::Test(preset) => self.test(*preset)?,
            StageAction::Command(command) => self.command(command)?,
            StageAction::Sequence(groups) => {
                for group in groups {
                    for name in group {
                        self.run(name)?;
                    }
                }
            }
            StageAction::Group => {}
            StageAction::Watch => self.watch()?,
        }

        self.completed.insert(stage.name.clone());
        println!(
            "Finished '{}' after {}",
            style(&stage.name).cyan(),
            style(format!("{:.2?}", started.elapsed())).magenta()
        );
        Ok(())
    }

    fn clean(&self) -> Result<()> {
        let build_dir = self.project.root.join(&self.project.config.soy.build_dir);
        if build_dir.exists() {
            std::fs::remove_dir_all(&build_dir).map_err(|e| TasksError::Io {
                context: format!("removing {}", build_dir.display()),
                source: e,
            })?;
        }
        Ok(())
    }

    fn soy(&mut self) -> Result<()> {
        let report = run_soy(
            &self.project.root,
            &self.project.config.soy,
            self.compiler,
            &mut self.registry,
        )?;

        if report.sources.is_empty() {
            eprintln!(
                "{} {}",
                style("warning:").yellow().bold(),
                style(format!(
                    "no templates matched {:?} in {}",
                    self.project.config.soy.patterns,
                    self.project.config.soy.src_dir.display()
                ))
                .yellow()
            );
        }
        println!(
            "  {} templates generated, {} compiled",
            report.generated.len(),
            report.compiled.len()
        );
        Ok(())
    }

    fn watch(&mut self) -> Result<()> {
        let project = self.project;
        let filter = SourceFilter::new(&project.root, &project.config.soy)?;
        watch_sources(&filter, |changed| {
            for path in changed {
                println!("  {} {}", style("changed").yellow(), path.display());
            }
            self.rebuild()
        })
    }

    /// Run `build` again from scratch, forgetting the stages and params of earlier runs.
    fn rebuild(&mut self) -> Result<()> {
        self.completed.clear();
        self.registry = ParameterRegistry::new();
        self.run("build")
    }

    fn test(&self, preset: TestPreset) -> Result<()> {
        let karma = preset.karma_config(&self.project.root, &self.project.config);
        self.tests.start(&karma)?;

        if preset == TestPreset::Coverage {
            println!(
                "  Coverage report: {}",
                style(
                    self.project
                        .root
                        .join(&self.project.config.test.coverage_report)
                        .display()
                )
                .cyan()
            );
        }
        Ok(())
    }

    fn command(&self, command: &CommandConfig) -> Result<()> {
        let root = &self.project.root;
        let mut vars = BTreeMap::new();
        vars.insert("root", root.display().to_string());
        vars.insert(
            "build_dir",
            root.join(&self.project.config.soy.build_dir)
                .display()
                .to_string(),
        );
        vars.insert(
            "dest_dir",
            root.join(&self.project.config.soy.dest_dir)
                .display()
                .to_string(),
        );

        let mut cmd = self::command::build_command(command, &vars)?;
        cmd.current_dir(root);
        self::command::run(cmd, &command.program)
    }
}
