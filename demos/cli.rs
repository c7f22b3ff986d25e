use campus_analytics::{
    flows::{self, SignupForm},
    identity,
    profile::{Channel, Profile},
    sink::{LogSink, Sink},
    Builder, Emitter, HttpSink,
};
use structopt::StructOpt;
use tracing_subscriber::EnvFilter;

#[derive(Debug, StructOpt)]
struct Opt {
    /// Log calls instead of sending them.
    #[structopt(long)]
    dry_run: bool,
    /// Domain of institutional addresses.
    #[structopt(long, default_value = "student.iu.org")]
    domain: String,
    #[structopt(subcommand)]
    cmd: Cmd,
}

#[derive(Debug, StructOpt)]
enum Cmd {
    /// Print the id an email resolves to.
    Resolve { email: String },
    /// Sign up a new student.
    Signup {
        #[structopt(long)]
        email: String,
        #[structopt(long)]
        program: String,
        #[structopt(long)]
        first_name: Option<String>,
        #[structopt(long)]
        last_name: Option<String>,
        #[structopt(long)]
        semester: Option<String>,
        #[structopt(long, default_value = "email")]
        channel: Channel,
        #[structopt(long)]
        email_marketing: bool,
        #[structopt(long)]
        whatsapp_marketing: bool,
    },
    /// Log in an existing student and log out again.
    Login {
        #[structopt(long)]
        email: String,
    },
    /// Log in with the personal address, then with the institutional one
    /// under the same id.
    IdResolution {
        #[structopt(long)]
        email: String,
        #[structopt(long, default_value = "mycampus")]
        system: String,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let opt = Opt::from_args();
    if let Cmd::Resolve { email } = &opt.cmd {
        println!("{} -> {}", email, identity::resolve(email));
        let institutional = identity::institution_email(email.trim(), &opt.domain);
        println!("{} -> {}", institutional, identity::resolve(&institutional));
        return Ok(());
    }

    let sink: Box<dyn Sink> = if opt.dry_run {
        Box::new(LogSink)
    } else {
        Box::new(HttpSink::new(&Builder::new().config()?))
    };
    let mut emitter = Emitter::new(sink);

    match opt.cmd {
        Cmd::Resolve { .. } => {}
        Cmd::Signup {
            email,
            program,
            first_name,
            last_name,
            semester,
            channel,
            email_marketing,
            whatsapp_marketing,
        } => {
            let form = SignupForm {
                first_name,
                last_name,
                email_personal: email,
                phone: None,
                program,
                semester,
                preferred_channel: channel,
                email_marketing_opt_in: email_marketing,
                whatsapp_marketing_opt_in: whatsapp_marketing,
            };
            let profile = flows::sign_up(&mut emitter, form, &opt.domain);
            println!("{:#?}", profile);
        }
        Cmd::Login { email } => {
            let profile = Profile::new(email, &opt.domain);
            flows::log_in(&mut emitter, &profile);
            flows::log_out(&mut emitter);
        }
        Cmd::IdResolution { email, system } => {
            let profile = Profile::new(email, &opt.domain);
            flows::log_in(&mut emitter, &profile);
            flows::link_institution_login(&mut emitter, &profile, &system);
            println!(
                "{} and {} are both {}",
                profile.email_personal, profile.email_institutional, profile.user_id
            );
            flows::log_out(&mut emitter);
        }
    }

    Ok(())
}
