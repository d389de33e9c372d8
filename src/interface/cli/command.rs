//! CLI 명령 파싱 모듈.

use clap::{Args, Parser, Subcommand};

use crate::application::config::ConnectionArgs;
use crate::application::usecases::invoke_operation::CommandRequest;
use crate::domain::operation::{Filter, Invocation, Operation};

#[derive(Debug, Parser)]
#[command(name = "smis", version)]
#[command(about = "Command-line client for SMI-S / CIM servers")]
pub struct Cli {
    #[command(flatten)]
    connection: ConnectionFlags,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Args)]
struct ConnectionFlags {
    /// Login user
    #[arg(short, long, global = true)]
    user: Option<String>,

    /// Login password
    #[arg(short, long, global = true)]
    password: Option<String>,

    /// Server location (host:port, optionally with http:// or https://)
    #[arg(short, long, global = true)]
    location: Option<String>,

    /// Default CIM namespace
    #[arg(short, long, global = true)]
    namespace: Option<String>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// GetInstance: fetch one instance by object path
    Gi { objectname: String },
    /// EnumerateInstances: list instances of a class
    Ei { classname: String },
    /// EnumerateInstanceNames: list instance paths of a class
    En { classname: String },
    /// Associators: instances associated with an object
    A {
        objectname: String,
        #[command(flatten)]
        filters: AssociatorFilters,
    },
    /// AssociatorNames: paths of instances associated with an object
    An {
        objectname: String,
        #[command(flatten)]
        filters: AssociatorFilters,
    },
    /// References: association instances that refer to an object
    R {
        objectname: String,
        #[command(flatten)]
        filters: ReferenceFilters,
    },
    /// ReferenceNames: paths of association instances that refer to an object
    Rn {
        objectname: String,
        #[command(flatten)]
        filters: ReferenceFilters,
    },
    /// InvokeMethod: call an extrinsic method with name=value parameters
    Im {
        objectname: String,
        methodname: String,
        /// Parameters as name=value, name=type,value or name={object path}
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        params: Vec<String>,
    },
    /// Show effective merged config
    Config,
}

#[derive(Debug, Args)]
struct AssociatorFilters {
    /// Association class filter
    #[arg(long = "ac")]
    assoc_class: Option<String>,
    /// Result class filter
    #[arg(long = "rc")]
    result_class: Option<String>,
    /// Role of the source object in the association
    #[arg(long)]
    role: Option<String>,
    /// Role of the result object in the association
    #[arg(long)]
    result_role: Option<String>,
}

#[derive(Debug, Args)]
struct ReferenceFilters {
    /// Result class filter
    #[arg(long = "rc")]
    result_class: Option<String>,
    /// Role of the source object in the association
    #[arg(long)]
    role: Option<String>,
}

pub enum CliAction {
    InspectConfig,
    Invoke(CommandRequest),
}

impl Cli {
    /// 사용법 오류는 clap이 안내를 출력하고 종료 코드 2로 끝낸다.
    pub fn parse_action() -> CliAction {
        Cli::parse().into_action()
    }

    fn into_action(self) -> CliAction {
        let connection = ConnectionArgs {
            user: self.connection.user,
            password: self.connection.password,
            location: self.connection.location,
            namespace: self.connection.namespace,
        };

        let invocation = match self.command {
            Commands::Config => return CliAction::InspectConfig,
            Commands::Gi { objectname } => Invocation::new(Operation::GetInstance, objectname),
            Commands::Ei { classname } => Invocation::new(Operation::EnumerateInstances, classname),
            Commands::En { classname } => {
                Invocation::new(Operation::EnumerateInstanceNames, classname)
            }
            Commands::A {
                objectname,
                filters,
            } => filters.apply(Invocation::new(Operation::Associators, objectname)),
            Commands::An {
                objectname,
                filters,
            } => filters.apply(Invocation::new(Operation::AssociatorNames, objectname)),
            Commands::R {
                objectname,
                filters,
            } => filters.apply(Invocation::new(Operation::References, objectname)),
            Commands::Rn {
                objectname,
                filters,
            } => filters.apply(Invocation::new(Operation::ReferenceNames, objectname)),
            Commands::Im {
                objectname,
                methodname,
                params,
            } => {
                let mut invocation = Invocation::new(Operation::InvokeMethod, objectname);
                invocation.method = Some(methodname);
                invocation.params = params;
                invocation
            }
        };

        CliAction::Invoke(CommandRequest {
            connection,
            invocation,
        })
    }
}

impl AssociatorFilters {
    fn apply(self, invocation: Invocation) -> Invocation {
        with_filters(
            invocation,
            [
                (Filter::AssocClass, self.assoc_class),
                (Filter::ResultClass, self.result_class),
                (Filter::Role, self.role),
                (Filter::ResultRole, self.result_role),
            ],
        )
    }
}

impl ReferenceFilters {
    fn apply(self, invocation: Invocation) -> Invocation {
        with_filters(
            invocation,
            [
                (Filter::ResultClass, self.result_class),
                (Filter::Role, self.role),
            ],
        )
    }
}

/// 지정된 필터만 붙인다. 빈 값 검증은 도메인에서 한다.
fn with_filters<const N: usize>(
    invocation: Invocation,
    filters: [(Filter, Option<String>); N],
) -> Invocation {
    filters
        .into_iter()
        .fold(invocation, |inv, (filter, value)| match value {
            Some(value) => inv.with_filter(filter, value),
            None => inv,
        })
}
