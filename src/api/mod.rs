//! Typed wrappers over the REST endpoints.
//!
//! Each group borrows an [`ApiClient`], so every call goes through the same
//! authenticated pipeline.

pub mod models;

use crate::error::Result;
use crate::http::{ApiClient, RequestDescriptor};

use models::{
    AddTestCase, Credentials, Listing, LoginResponse, Message, NewProject, NewTestCase,
    NewTestPlan, Page, PageRequest, Project, RegisterRequest, RegisterResponse, TestCase,
    TestCaseUpdate, TestPlan, TestPlanUpdate, User,
};

/// `/auth/*` and `/profile`.
pub struct AuthApi<'a> {
    client: &'a ApiClient,
}

impl<'a> AuthApi<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// Exchange credentials for a token and install the session.
    ///
    /// If the session changed while the exchange was in flight (a logout or
    /// another login), the result is returned but not installed.
    pub async fn login(&self, credentials: &Credentials) -> Result<LoginResponse> {
        let session = self.client.session();
        let observed = session.version();
        let response: LoginResponse = self.client.post_json("/auth/login", credentials).await?;

        if session.login_if_current(observed, response.user.clone(), response.token.clone())? {
            tracing::info!(user = %response.user.email, "logged in");
        } else {
            tracing::warn!("session changed during login; new credentials not installed");
        }
        Ok(response)
    }

    /// Create an account. Signs in only when the server returns a token.
    pub async fn register(&self, request: &RegisterRequest) -> Result<RegisterResponse> {
        let session = self.client.session();
        let observed = session.version();
        let response: RegisterResponse = self.client.post_json("/auth/register", request).await?;

        if let (Some(user), Some(token)) = (&response.user, &response.token) {
            session.login_if_current(observed, user.clone(), token.clone())?;
        }
        Ok(response)
    }

    pub async fn profile(&self) -> Result<User> {
        self.client.get_json("/profile").await
    }
}

/// `/test-plans`.
pub struct TestPlansApi<'a> {
    client: &'a ApiClient,
}

impl<'a> TestPlansApi<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self, project_id: &str, page: PageRequest) -> Result<Page<TestPlan>> {
        let descriptor = RequestDescriptor::get("/test-plans")
            .with_query("project_id", project_id)
            .with_query("page", page.page)
            .with_query("size", page.size);
        self.client.fetch_json(descriptor).await
    }

    pub async fn get(&self, id: &str) -> Result<TestPlan> {
        self.client.get_json(&format!("/test-plans/{id}")).await
    }

    pub async fn create(&self, plan: &NewTestPlan) -> Result<TestPlan> {
        self.client.post_json("/test-plans", plan).await
    }

    pub async fn update(&self, id: &str, update: &TestPlanUpdate) -> Result<TestPlan> {
        self.client
            .put_json(&format!("/test-plans/{id}"), update)
            .await
    }

    pub async fn add_test_case(&self, plan_id: &str, test_case_id: &str) -> Result<Message> {
        let body = AddTestCase {
            test_case_id: test_case_id.to_string(),
        };
        self.client
            .post_json(&format!("/test-plans/{plan_id}/test-cases"), &body)
            .await
    }
}

/// `/test-cases`.
pub struct TestCasesApi<'a> {
    client: &'a ApiClient,
}

impl<'a> TestCasesApi<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self, project_id: &str, page: PageRequest) -> Result<Page<TestCase>> {
        let descriptor = RequestDescriptor::get("/test-cases")
            .with_query("project_id", project_id)
            .with_query("page", page.page)
            .with_query("size", page.size);
        self.client.fetch_json(descriptor).await
    }

    pub async fn get(&self, id: &str) -> Result<TestCase> {
        self.client.get_json(&format!("/test-cases/{id}")).await
    }

    pub async fn create(&self, case: &NewTestCase) -> Result<TestCase> {
        self.client.post_json("/test-cases", case).await
    }

    pub async fn update(&self, id: &str, update: &TestCaseUpdate) -> Result<TestCase> {
        self.client
            .put_json(&format!("/test-cases/{id}"), update)
            .await
    }
}

/// `/projects`.
pub struct ProjectsApi<'a> {
    client: &'a ApiClient,
}

impl<'a> ProjectsApi<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> Result<Vec<Project>> {
        let listing: Listing<Project> = self.client.get_json("/projects").await?;
        Ok(listing.into_items())
    }

    pub async fn create(&self, project: &NewProject) -> Result<Project> {
        self.client.post_json("/projects", project).await
    }
}
