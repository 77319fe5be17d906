/// One launchable app as reported by module discovery.
#[derive(Debug, Clone, PartialEq)]
pub struct AppMeta {
    pub name: String,
    /// Registered resource name of the icon.
    pub icon: Option<String>,
    /// Apps sharing a category are grouped in a folder on the home grid.
    pub category: Option<String>,
    /// Key the builder source resolves.
    pub builder: String,
    /// Arguments the builder expects, in order.
    pub arg_names: Vec<String>,
    /// Every launch gets a fresh instance when true.
    pub multi_instance: bool,
}

impl AppMeta {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            builder: name.clone(),
            name,
            icon: None,
            category: None,
            arg_names: Vec::new(),
            multi_instance: false,
        }
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn in_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_builder(mut self, builder: impl Into<String>) -> Self {
        self.builder = builder.into();
        self
    }

    pub fn with_args<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.arg_names = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn multi_instance(mut self) -> Self {
        self.multi_instance = true;
        self
    }

    /// Lowercase name with runs of other characters collapsed to `-`.
    pub fn slug(&self) -> String {
        let mut slug = String::with_capacity(self.name.len());
        for c in self.name.chars() {
            if c.is_ascii_alphanumeric() {
                slug.push(c.to_ascii_lowercase());
            } else if !slug.is_empty() && !slug.ends_with('-') {
                slug.push('-');
            }
        }
        while slug.ends_with('-') {
            slug.pop();
        }
        if slug.is_empty() {
            slug.push_str("app");
        }
        slug
    }
}

/// App discovery.
pub trait AppCatalog: Send + Sync {
    fn list_apps(&self) -> Vec<AppMeta>;

    fn find(&self, name: &str) -> Option<AppMeta> {
        self.list_apps().into_iter().find(|app| app.name == name)
    }
}

/// Catalog over a fixed list.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    apps: Vec<AppMeta>,
}

impl StaticCatalog {
    pub fn new(apps: Vec<AppMeta>) -> Self {
        Self { apps }
    }
}

impl AppCatalog for StaticCatalog {
    fn list_apps(&self) -> Vec<AppMeta> {
        self.apps.clone()
    }
}
