use std::str::FromStr;

/// An RGB color, the payload accepted by a led color actuator.
///
/// Its textual form is `<R>,<G>,<B>` with each channel in `0..=255`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    /// Red channel.
    pub red: u8,
    /// Green channel.
    pub green: u8,
    /// Blue channel.
    pub blue: u8,
}

impl Rgb {
    /// Red.
    pub const RED: Self = Self::new(255, 0, 0);
    /// White.
    pub const WHITE: Self = Self::new(255, 255, 255);

    /// Creates an [`Rgb`] color.
    #[must_use]
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }
}

impl std::fmt::Display for Rgb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{},{}", self.red, self.green, self.blue)
    }
}

/// Error returned when a text is not an `<R>,<G>,<B>` triple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseRgbError(String);

impl std::fmt::Display for ParseRgbError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid color `{}`, expected `<R>,<G>,<B>`", self.0)
    }
}

impl std::error::Error for ParseRgbError {}

impl FromStr for Rgb {
    type Err = ParseRgbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let error = || ParseRgbError(s.into());

        let mut channels = s.split(',').map(|channel| channel.trim().parse::<u8>());
        let mut next = || channels.next().and_then(Result::ok).ok_or_else(error);

        let rgb = Self::new(next()?, next()?, next()?);

        if channels.next().is_some() {
            return Err(error());
        }

        Ok(rgb)
    }
}

/// The actuation state broadcast to every actuator in a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// At least one sensor reached the threshold.
    Alert,
    /// No sensor reached the threshold.
    Normal,
}

impl Command {
    /// Returns the color written to actuators for this command.
    #[must_use]
    pub const fn color(self) -> Rgb {
        match self {
            Self::Alert => Rgb::RED,
            Self::Normal => Rgb::WHITE,
        }
    }

    /// Returns the payload written to actuators for this command.
    #[must_use]
    pub fn payload(self) -> String {
        self.color().to_string()
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Alert => "ALERT",
            Self::Normal => "NORMAL",
        })
    }
}
