/// Light/dark appearance, toggled from the dock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeMode {
    Light,
    Dark,
}

/// Color tokens derived from the theme. Every surface that needs a theme
/// color reads these; nothing consults the mode enum directly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThemeTokens {
    /// Viewport clear color.
    pub background: [u8; 3],
    /// Translucent dock fill.
    pub panel_fill: [u8; 4],
    pub text: [u8; 3],
}

impl ThemeMode {
    pub fn toggled(self) -> Self {
        match self {
            ThemeMode::Light => ThemeMode::Dark,
            ThemeMode::Dark => ThemeMode::Light,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ThemeMode::Light => "Light",
            ThemeMode::Dark => "Dark",
        }
    }

    pub fn tokens(&self) -> ThemeTokens {
        match self {
            ThemeMode::Light => ThemeTokens {
                background: [242, 241, 238],
                panel_fill: [255, 255, 255, 204],
                text: [28, 28, 32],
            },
            ThemeMode::Dark => ThemeTokens {
                background: [17, 19, 24],
                panel_fill: [30, 32, 38, 224],
                text: [228, 229, 235],
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ThemeMode;

    #[test]
    fn toggling_twice_restores_the_mode() {
        assert_eq!(ThemeMode::Light.toggled().toggled(), ThemeMode::Light);
        assert_eq!(ThemeMode::Dark.toggled().toggled(), ThemeMode::Dark);
    }

    #[test]
    fn modes_have_distinct_tokens() {
        assert_ne!(ThemeMode::Light.tokens(), ThemeMode::Dark.tokens());
    }
}
