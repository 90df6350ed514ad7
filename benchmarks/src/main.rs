use anyhow::anyhow;
use clap::{Parser, ValueEnum};
use const_format::concatcp;
use rand::seq::SliceRandom;
use rand::Rng;
use reqwest::blocking::{Client, Response};
use serde::Deserialize;
use serde_json::{json, Value};
use std::env;
use std::fs::File;
use std::io::Write;
use std::ops::{AddAssign, Div};
use std::process::{self, Child, Command, Stdio};
use std::thread;
use std::time::{Duration as StdDuration, Instant};
use tempfile::NamedTempFile;

const LOCAL_PORT: u32 = 8374;
const LOCAL_URL: &str = concatcp!("http://127.0.0.1:", LOCAL_PORT);

#[rustfmt::skip]
const ROCKET_ENV: &[(&str, &str)] = &[
    ("ROCKET_PORT", concatcp!(LOCAL_PORT)),
    ("ROCKET_EVENT_BUFFER", "1024"),
];

#[rustfmt::skip]
const CATEGORIES: &[&str] = &[
    "asian",
    "cafe",
    "chinese",
    "etc",
    "fast",
    "japanese",
    "korean",
    "western",
];

#[rustfmt::skip]
const FOODS: &[(&str, &str)] = &[
    ("bibimbap", "korean"),
    ("tteokbokki", "korean"),
    ("mapo_tofu", "chinese"),
    ("ramen", "japanese"),
    ("sushi", "japanese"),
    ("pho", "asian"),
    ("burger", "fast"),
    ("pasta", "western"),
    ("waffle", "cafe"),
];

#[derive(Parser)]
struct Args {
    /// Silence local server logging.
    #[arg(short, long)]
    quiet: bool,

    /// Send local server logging to this file; takes precedence over --quiet.
    #[arg(long)]
    logfile: Option<String>,

    /// Connect to a remote server at this URL instead of running a local one.
    #[arg(long)]
    remote: Option<String>,

    /// How many threads to use. Defaults to the number of logical CPUs.
    #[arg(long, default_value_t = num_cpus::get())]
    threads: usize,

    /// How many participants each thread adds to the session.
    #[arg(long, default_value_t = 50)]
    participants: usize,

    /// Which preference model the simulated participants submit.
    #[arg(long, value_enum, default_value_t)]
    submit_mode: SubmitMode,

    /// Re-rank the final session dump with recommend-cli and compare.
    #[arg(long)]
    verify: bool,
}

/// The shape of the preferences each simulated participant submits.
#[derive(Debug, Copy, Clone, Default, ValueEnum)]
enum SubmitMode {
    /// Only liked and disliked categories.
    Categories,
    /// Only craving and not-craving foods.
    Foods,
    /// Both, as the full input flow does.
    #[default]
    Mixed,
}

impl SubmitMode {
    /// Random preferences in this mode.
    fn preferences(&self, rng: &mut impl Rng) -> Value {
        let mut likes = CATEGORIES.choose_multiple(rng, 2);
        let liked = likes.next();
        let disliked = likes.next();
        let craving = FOODS.choose(rng).map(food);
        let not_craving = FOODS.choose(rng).map(food);
        let allergies: Vec<_> = ["peanut", "shellfish", "milk"]
            .into_iter()
            .filter(|_| rng.gen_bool(0.1))
            .collect();

        match self {
            Self::Categories => json!({
                "likedCategories": liked.into_iter().collect::<Vec<_>>(),
                "dislikedCategories": disliked.into_iter().collect::<Vec<_>>(),
                "allergies": allergies,
            }),
            Self::Foods => json!({
                "cravingFoods": craving.into_iter().collect::<Vec<_>>(),
                "notCravingFoods": not_craving.into_iter().collect::<Vec<_>>(),
                "allergies": allergies,
            }),
            Self::Mixed => json!({
                "likedCategories": liked.into_iter().collect::<Vec<_>>(),
                "dislikedCategories": disliked.into_iter().collect::<Vec<_>>(),
                "cravingFoods": craving.into_iter().collect::<Vec<_>>(),
                "notCravingFoods": not_craving.into_iter().collect::<Vec<_>>(),
                "allergies": allergies,
            }),
        }
    }
}

/// A food selection as the input flow would send it.
fn food(&(id, category): &(&str, &str)) -> Value {
    json!({
        "id": id,
        "name": id.replace('_', " "),
        "category": category,
    })
}

/// Construct a URL from segments.
macro_rules! url {
    ($($segment:expr),+) => {{
        std::path::PathBuf::from_iter([$($segment),+]).to_str().unwrap().to_string()
    }}
}

/// Build everything we need before starting the server.
fn setup_deps(verify: bool) -> anyhow::Result<()> {
    let mut args = vec!["build", "--release", "--bins"];
    if verify {
        args.extend(["--features", "cli"]);
    }
    Command::new("cargo")
        .args(args)
        .status()?
        .success()
        .then_some(())
        .ok_or_else(|| anyhow!("server build exited nonzero"))?;

    for (var, val) in ROCKET_ENV {
        env::set_var(var, val);
    }
    Ok(())
}

/// Terminate the given child process. This is a SIGTERM on unix and a hard-kill on other
/// platforms.
fn terminate_child(child: &mut Child) -> anyhow::Result<()> {
    #[cfg(unix)]
    {
        let pid = nix::unistd::Pid::from_raw(child.id() as i32);
        nix::sys::signal::kill(pid, nix::sys::signal::Signal::SIGTERM)?;
    }
    #[cfg(not(unix))]
    {
        child.kill()?;
    }
    Ok(())
}

/// Launch a local server and wait until it answers.
fn launch_server(logfile: Stdio) -> anyhow::Result<Child> {
    let mut proc = Command::new("./target/release/groupmenu-backend")
        .stdout(logfile)
        .spawn()?;

    let client = Client::new();
    loop {
        let resp = client
            .get(url!(LOCAL_URL, "categories"))
            .send()
            .and_then(Response::error_for_status);
        if resp.is_ok() {
            break;
        }

        // Check the server didn't exit.
        if let Some(retcode) = proc.try_wait()? {
            return Err(anyhow!("Server exited prematurely with code {}", retcode));
        }
        thread::sleep(StdDuration::from_millis(50));
    }

    Ok(proc)
}

/// Create a session to benchmark against and return its code.
fn setup_session(url: &str) -> anyhow::Result<String> {
    let session = json!({
        "title": "Benchmark Session",
        "participantNames": ["Host", "Co-host"],
    });

    #[derive(Deserialize)]
    struct Created {
        id: String,
    }
    let Created { id } = Client::new()
        .post(url!(url, "sessions"))
        .json(&session)
        .send()
        .and_then(Response::error_for_status)?
        .json()?;
    Ok(id)
}

/// Durations of each part of a participant's visit.
#[derive(Debug, Default)]
struct Timings {
    join: StdDuration,
    submit: StdDuration,
    rank: StdDuration,
}

impl AddAssign for Timings {
    fn add_assign(&mut self, rhs: Self) {
        self.join += rhs.join;
        self.submit += rhs.submit;
        self.rank += rhs.rank;
    }
}

impl Div<u32> for Timings {
    type Output = Self;

    fn div(self, rhs: u32) -> Self {
        Self {
            join: self.join / rhs,
            submit: self.submit / rhs,
            rank: self.rank / rhs,
        }
    }
}

/// Join the session, submit random preferences, then read the ranking.
fn participate(
    url: &str,
    code: &str,
    name: &str,
    client: &Client,
    submit_mode: SubmitMode,
) -> anyhow::Result<Timings> {
    let pre_join = Instant::now();
    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Joined {
        participant_id: String,
    }
    let Joined { participant_id } = client
        .post(url!(url, "sessions", code, "participants"))
        .json(&json!({ "name": name }))
        .send()
        .and_then(Response::error_for_status)?
        .json()?;
    let post_join = Instant::now();

    let pre_submit = Instant::now();
    let preferences = submit_mode.preferences(&mut rand::thread_rng());
    client
        .put(url!(
            url,
            "sessions",
            code,
            "participants",
            &participant_id,
            "preferences"
        ))
        .json(&preferences)
        .send()
        .and_then(Response::error_for_status)?;
    let post_submit = Instant::now();

    let pre_rank = Instant::now();
    client
        .get(url!(url, "sessions", code, "recommendations"))
        .send()
        .and_then(Response::error_for_status)?;
    let post_rank = Instant::now();

    Ok(Timings {
        join: post_join.duration_since(pre_join),
        submit: post_submit.duration_since(pre_submit),
        rank: post_rank.duration_since(pre_rank),
    })
}

/// Run the benchmark.
fn benchmark(
    url: &str,
    code: &str,
    num_threads: usize,
    per_thread: usize,
    submit_mode: SubmitMode,
) -> anyhow::Result<()> {
    let total = num_threads * per_thread;

    let start = Instant::now();
    thread::scope(|s| {
        let mut threads = Vec::with_capacity(num_threads);

        for t in 0..num_threads {
            let handle = s.spawn(move || {
                let client = Client::new();
                let mut timings = Timings::default();
                for i in 0..per_thread {
                    let name = format!("Guest {t}-{i}");
                    timings += participate(url, code, &name, &client, submit_mode)?;
                }
                Ok::<_, anyhow::Error>(timings / per_thread as u32)
            });
            threads.push(handle);
        }

        let mut timings = Timings::default();
        for handle in threads {
            timings += handle.join().expect("thread panicked")?;
        }
        let total_duration = start.elapsed();

        let avg = timings / num_threads as u32;
        let avg_total = avg.join + avg.submit + avg.rank;
        // Theoretical participants per sec is 1/avg_duration * num_threads.
        let per_sec = num_threads as f64 / avg_total.as_secs_f64();
        // Actual participants per sec is total / total_time.
        let actual_per_sec = total as f64 / total_duration.as_secs_f64();

        println!("join:   {:?}", avg.join);
        println!("submit: {:?}", avg.submit);
        println!("rank:   {:?}", avg.rank);

        println!("\ntotal: {:?} ({:.2}/s)", avg_total, per_sec);
        println!(
            "actual duration: {} participants in {:?} ({:.2}/s)",
            total, total_duration, actual_per_sec
        );

        Ok(())
    })
}

/// Check that concurrent readers all see the same ranking.
fn check_consistent(url: &str, code: &str, num_threads: usize) -> anyhow::Result<Value> {
    let rankings = thread::scope(|s| {
        let threads: Vec<_> = (0..num_threads)
            .map(|_| {
                s.spawn(move || {
                    Client::new()
                        .get(url!(url, "sessions", code, "recommendations"))
                        .send()
                        .and_then(Response::error_for_status)?
                        .json::<Value>()
                        .map_err(anyhow::Error::from)
                })
            })
            .collect();
        threads
            .into_iter()
            .map(|t| t.join().expect("thread panicked"))
            .collect::<anyhow::Result<Vec<_>>>()
    })?;

    let first = rankings
        .first()
        .cloned()
        .ok_or_else(|| anyhow!("no readers ran"))?;
    if rankings.iter().any(|ranking| *ranking != first) {
        return Err(anyhow!("concurrent readers saw different rankings"));
    }
    Ok(first)
}

/// Return `Ok(())` if the offline ranking of the session dump matches the server's.
fn verify(url: &str, code: &str, served: &Value) -> anyhow::Result<()> {
    let dump = Client::new()
        .get(url!(url, "sessions", code, "dump"))
        .send()
        .and_then(Response::error_for_status)?
        .bytes()?;

    // Dump the dump to a file and run the ranking tool on it.
    let mut f = NamedTempFile::new()?;
    f.write_all(&dump)?;
    f.flush()?;

    let output = Command::new("./target/release/recommend-cli")
        .arg("--json")
        .arg(f.path())
        .output()?;
    if !output.status.success() {
        return Err(anyhow!("recommend-cli exited nonzero"));
    }
    let offline: Value = serde_json::from_slice(&output.stdout)?;
    if offline != *served {
        return Err(anyhow!("offline ranking differs from the server's"));
    }
    println!("verified: offline ranking matches");
    Ok(())
}

fn run() -> anyhow::Result<()> {
    let args = Args::parse();
    let url = args.remote.as_deref().unwrap_or(LOCAL_URL);

    // If we're not connecting remotely, bring up a local server.
    let mut proc: Option<Child> = None;
    if args.remote.is_none() {
        setup_deps(args.verify)?;
        let logfile = match args.logfile {
            Some(path) => Stdio::from(File::create(path)?),
            None => {
                if args.quiet {
                    Stdio::null()
                } else {
                    Stdio::inherit()
                }
            }
        };
        proc = Some(launch_server(logfile)?);
    }

    // Use a closure to ensure the cleanup below runs.
    let result = (|| {
        let code = setup_session(url)?;
        benchmark(url, &code, args.threads, args.participants, args.submit_mode)?;
        let served = check_consistent(url, &code, args.threads)?;

        if args.verify {
            verify(url, &code, &served)?;
        }

        Ok(())
    })();

    // Kill the server.
    if let Some(p) = proc.as_mut() {
        terminate_child(p)?;
        p.wait()?;
    }

    result
}

fn main() {
    if let Err(e) = run() {
        eprintln!("FATAL: {}", e);
        process::exit(1);
    }
}
