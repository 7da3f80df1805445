use http::Method;
use matchit::Router;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use super::Url;
use crate::config::ConfigError;
use crate::handler::Handler;
use crate::request::MatchedRoute;

/// The compiled route table of an application.
///
pub(crate) struct Routes<S> {
    router: Router<usize>,
    paths: Vec<PathRules>,
    handlers: HashMap<Arc<str>, Arc<dyn Handler<S>>>,
    patterns: HashMap<Arc<str>, String>,
}

/// Why a path and method did not resolve to an endpoint.
///
#[derive(Debug, PartialEq)]
pub(crate) enum RouteError {
    NotFound,
    MethodNotAllowed(Vec<Method>),
    /// The path matches with a trailing slash appended.
    Redirect,
}

struct PathRules {
    path: String,
    rules: Vec<Rule>,
}

struct Rule {
    methods: Option<Vec<Method>>,
    endpoint: Arc<str>,
}

impl<S> Routes<S> {
    pub(crate) fn compile(urls: Vec<Url<S>>) -> Result<Self, ConfigError> {
        let mut routes = Self {
            router: Router::new(),
            paths: Vec::new(),
            handlers: HashMap::new(),
            patterns: HashMap::new(),
        };

        let mut aliases = Vec::new();

        for url in urls {
            let endpoint: Arc<str> = Arc::from(url.endpoint);

            match url.handler {
                Some(handler) => match routes.handlers.entry(Arc::clone(&endpoint)) {
                    Entry::Occupied(_) => {
                        return Err(ConfigError::DuplicateEndpoint(endpoint.to_string()));
                    }
                    Entry::Vacant(vacant) => {
                        vacant.insert(handler);
                    }
                },
                None => aliases.push(Arc::clone(&endpoint)),
            }

            routes
                .patterns
                .entry(Arc::clone(&endpoint))
                .or_insert_with(|| url.path.clone());

            routes.insert(url.path, url.methods, endpoint)?;
        }

        if let Some(endpoint) = aliases
            .into_iter()
            .find(|endpoint| !routes.handlers.contains_key(endpoint))
        {
            return Err(ConfigError::MissingHandler(endpoint.to_string()));
        }

        Ok(routes)
    }

    pub(crate) fn handler(&self, endpoint: &str) -> Option<&Arc<dyn Handler<S>>> {
        self.handlers.get(endpoint)
    }

    /// The path pattern of the first route registered for `endpoint`.
    ///
    pub(crate) fn pattern(&self, endpoint: &str) -> Option<&str> {
        self.patterns.get(endpoint).map(String::as_str)
    }

    pub(crate) fn lookup(&self, method: &Method, path: &str) -> Result<MatchedRoute, RouteError> {
        let matched = match self.router.at(path) {
            Ok(matched) => matched,
            Err(_) if !path.ends_with('/') && self.router.at(&format!("{}/", path)).is_ok() => {
                return Err(RouteError::Redirect);
            }
            Err(_) => return Err(RouteError::NotFound),
        };

        let rules = &self.paths[*matched.value];

        match rules.rules.iter().find(|rule| rule.accepts(method)) {
            Some(rule) => Ok(MatchedRoute::new(
                Arc::clone(&rule.endpoint),
                matched.params.iter(),
            )),
            None => Err(RouteError::MethodNotAllowed(rules.allowed())),
        }
    }

    fn insert(
        &mut self,
        path: String,
        methods: Option<Vec<Method>>,
        endpoint: Arc<str>,
    ) -> Result<(), ConfigError> {
        let rule = Rule { methods, endpoint };

        if let Some(existing) = self.paths.iter_mut().find(|rules| rules.path == path) {
            if let Some(method) = existing.overlap(&rule) {
                return Err(ConfigError::DuplicateRoute { path, method });
            }

            existing.rules.push(rule);
            return Ok(());
        }

        if let Err(source) = self.router.insert(path.clone(), self.paths.len()) {
            return Err(ConfigError::Route { path, source });
        }

        self.paths.push(PathRules {
            path,
            rules: vec![rule],
        });

        Ok(())
    }
}

impl PathRules {
    /// Returns the first method that `rule` shares with an existing rule.
    ///
    fn overlap(&self, rule: &Rule) -> Option<String> {
        self.rules.iter().find_map(|existing| {
            match (&existing.methods, &rule.methods) {
                (None, _) | (_, None) => Some("*".to_owned()),
                (Some(left), Some(right)) => left
                    .iter()
                    .find(|method| right.contains(method))
                    .map(ToString::to_string),
            }
        })
    }

    fn allowed(&self) -> Vec<Method> {
        let mut allowed = Vec::new();

        for method in self.rules.iter().flat_map(|rule| rule.methods.iter().flatten()) {
            if !allowed.contains(method) {
                allowed.push(method.clone());
            }

            if method == Method::GET && !allowed.contains(&Method::HEAD) {
                allowed.push(Method::HEAD);
            }
        }

        allowed
    }
}

impl Rule {
    fn accepts(&self, method: &Method) -> bool {
        match &self.methods {
            None => true,
            Some(methods) => {
                methods.contains(method) || (method == Method::HEAD && methods.contains(&Method::GET))
            }
        }
    }
}
