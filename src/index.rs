use std::collections::HashMap;
use tracing::debug;

use crate::github::{Comment, Issue};

/// Issues paired with their comments, matched on the comment's `issue_url`.
///
/// Every issue has a bucket, possibly empty. Comments that point at an issue
/// outside the collection are dropped.
#[derive(Debug, Clone, Default)]
pub struct IssueCommentIndex {
    buckets: HashMap<Issue, Vec<Comment>>,
}

impl IssueCommentIndex {
    pub fn build(issues: &[Issue], comments: &[Comment]) -> Self {
        let by_url: HashMap<&str, &Issue> = issues.iter().map(|i| (i.url.as_str(), i)).collect();
        let mut buckets: HashMap<Issue, Vec<Comment>> =
            issues.iter().map(|i| (i.clone(), Vec::new())).collect();

        let mut dropped = 0usize;
        for comment in comments {
            match by_url.get(comment.issue_url.as_str()) {
                Some(issue) => {
                    if let Some(bucket) = buckets.get_mut(*issue) {
                        bucket.push(comment.clone());
                    }
                }
                None => dropped += 1,
            }
        }
        debug!(issues = buckets.len(), comments = comments.len(), dropped, "built issue/comment index");

        Self { buckets }
    }

    #[cfg(test)]
    pub fn comments_for(&self, issue: &Issue) -> &[Comment] {
        self.buckets.get(issue).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Issue, &[Comment])> {
        self.buckets.iter().map(|(issue, comments)| (issue, comments.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// Number of comments that landed in some bucket.
    pub fn linked_comments(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }
}
