//! Log formatting with simulation context.
//!
//! Every line is prefixed with the simulation time of the rank that
//! emitted it, followed by the level, the span stack and the target.
//! Component hooks run inside a `component{name rank}` span, so their
//! output reads as
//!
//! ```text
//! [ 2s ] INFO component{name=ping rank=0}: pingpong::pingpong::ping: Repeats: 1
//! ```

use std::fmt;

use nu_ansi_term::{Color, Style};
use tracing::{Level, Subscriber};
use tracing_subscriber::{
    filter::Directive,
    fmt::{format::Writer, FmtContext, FormatEvent, FormatFields, FormattedFields},
    registry::LookupSpan,
    util::SubscriberInitExt,
    EnvFilter,
};

use crate::time::SimTime;

/// The log level that will be used if `RUST_LOG` is not defined.
pub const FALLBACK_LOG_LEVEL: Level = Level::INFO;

/// Installs a global tracing subscriber with a sim formatter.
///
/// # Errors
///
/// Returns an error if a global subscriber was already installed.
pub fn try_init() -> Result<(), tracing_subscriber::util::TryInitError> {
    tracing_subscriber::fmt()
        .event_format(format())
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(Directive::from(FALLBACK_LOG_LEVEL))
                .from_env_lossy(),
        )
        .finish()
        .try_init()
}

/// Installs a global tracing subscriber with a sim formatter,
/// ignoring an already installed one.
pub fn init() {
    // a subscriber installed by the embedding application takes precedence
    let _ = try_init();
}

/// An instance of a simulation formatter.
#[must_use]
pub fn format() -> SimFormat {
    SimFormat { _priv: () }
}

/// A formatter that includes simulation specific information into the tracing messages.
#[derive(Debug, Clone)]
pub struct SimFormat {
    _priv: (),
}

impl<S, N> FormatEvent<S, N> for SimFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> fmt::Result {
        let meta = event.metadata();
        let paint = Painter(writer.has_ansi_escapes());
        let dimmed = Style::new().dimmed();
        let bold = Style::new().bold();

        paint.write(&mut writer, dimmed, format_args!("[ {} ] ", SimTime::now()))?;
        paint.write(
            &mut writer,
            level_style(*meta.level()),
            format_args!("{} ", meta.level().as_str()),
        )?;

        let spans = ctx.event_scope().into_iter().flat_map(|scope| scope.from_root());
        let mut any_span = false;
        for span in spans {
            any_span = true;
            paint.write(&mut writer, bold, format_args!("{}", span.metadata().name()))?;

            let ext = span.extensions();
            match ext.get::<FormattedFields<N>>() {
                Some(fields) if !fields.is_empty() => {
                    paint.write(&mut writer, bold, format_args!("{{"))?;
                    write!(writer, "{fields}")?;
                    paint.write(&mut writer, bold, format_args!("}}"))?;
                }
                _ => {}
            }
            paint.write(&mut writer, dimmed, format_args!(":"))?;
        }
        if any_span {
            writer.write_char(' ')?;
        }

        paint.write(&mut writer, dimmed, format_args!("{}: ", meta.target()))?;
        ctx.format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

fn level_style(level: Level) -> Style {
    let color = match level {
        Level::TRACE => Color::Cyan,
        Level::DEBUG => Color::Purple,
        Level::INFO => Color::Green,
        Level::WARN => Color::Yellow,
        Level::ERROR => Color::Red,
    };
    Style::new().fg(color)
}

/// Writes styled text if the writer supports ANSI escapes.
struct Painter(bool);

impl Painter {
    fn write(&self, writer: &mut Writer<'_>, style: Style, text: fmt::Arguments<'_>) -> fmt::Result {
        if self.0 {
            write!(writer, "{}{}{}", style.prefix(), text, style.suffix())
        } else {
            writer.write_fmt(text)
        }
    }
}
